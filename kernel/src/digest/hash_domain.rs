//! Typed domain separators for canonical hashing.
//!
//! Every digest computed over a path, frontier, or report selects a domain
//! via [`HashDomain`]. Adding a new domain is a single change here: the enum,
//! `as_bytes()`, `ALL`, and `Display` come from one macro invocation.

/// Declares `HashDomain` enum, `as_bytes()`, `ALL`, and `Display` from one list.
macro_rules! define_hash_domains {
    (
        $(
            $(#[$meta:meta])*
            $variant:ident => $bytes:expr
        ),+ $(,)?
    ) => {
        /// Typed domain separator for [`super::hash::canonical_hash`].
        ///
        /// Every variant maps to a unique, null-terminated byte string used as
        /// a SHA-256 prefix.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum HashDomain {
            $(
                $(#[$meta])*
                $variant,
            )+
        }

        impl HashDomain {
            /// The raw domain-separator bytes (null-terminated).
            #[must_use]
            pub const fn as_bytes(&self) -> &'static [u8] {
                match self {
                    $( Self::$variant => $bytes, )+
                }
            }

            /// All domain variants in declaration order.
            ///
            /// Generated from the same macro invocation as the enum; the two cannot diverge.
            pub const ALL: &[HashDomain] = &[
                $( Self::$variant, )+
            ];
        }

        impl core::fmt::Display for HashDomain {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                match self {
                    $( Self::$variant => write!(f, stringify!($variant)), )+
                }
            }
        }
    };
}

define_hash_domains! {
    // -----------------------------------------------------------------------
    // Search
    // -----------------------------------------------------------------------

    /// Voxel sequence of a reconstructed path.
    TracedPath => b"NEURITE::TRACED_PATH::V1\0",

    /// Frontier snapshot (per-direction visited voxels and statuses).
    FrontierSnapshot => b"NEURITE::FRONTIER_SNAPSHOT::V1\0",

    // -----------------------------------------------------------------------
    // Harness
    // -----------------------------------------------------------------------

    /// Serialized trace configuration echoed into reports.
    TraceConfig => b"NEURITE::TRACE_CONFIG::V1\0",

    /// Serialized trace report content.
    TraceReport => b"NEURITE::TRACE_REPORT::V1\0",

    // -----------------------------------------------------------------------
    // Benchmarks
    // -----------------------------------------------------------------------

    /// Benchmark input volume hashing.
    BenchInput => b"NEURITE::BENCH_INPUT::V1\0",
}
