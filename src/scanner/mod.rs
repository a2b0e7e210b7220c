pub mod baseline;
mod engine;

pub use engine::Scanner;
