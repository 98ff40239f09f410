// Audio module - buffer type, WAV I/O and metronome rendering

pub mod buffer;
pub mod metronome;
pub mod wav;

// Re-export commonly used types for convenience
pub use buffer::AudioBuffer;
pub use wav::{read_wav, write_wav};
