pub mod mr_white;
