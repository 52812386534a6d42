pub mod terrarium;

pub use terrarium::TerrariumClient;
