pub mod pair;

pub use pair::{collect_normalized, Buckets, NormalizedPair, RawDexPair};
