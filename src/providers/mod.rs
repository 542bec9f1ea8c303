pub mod awesomeapi;

pub use awesomeapi::AwesomeApiProvider;
