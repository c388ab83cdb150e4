pub mod random;

pub use random::{KeySuffixGenerator, OsRandom};
