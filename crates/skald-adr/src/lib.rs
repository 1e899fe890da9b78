pub mod render;
pub mod store;
pub mod synth;

pub use render::{parse_decision, render_decision};
pub use store::{list_decisions, load_decision, save_decision, supersede};
pub use synth::{maybe_synthesize, Synthesis};
