pub mod buffer;
pub mod capture;
pub mod correlator;
pub mod ignore;

pub use buffer::EventBuffer;
pub use capture::parse_input_event;
pub use correlator::Correlator;
pub use ignore::IgnoreRules;
