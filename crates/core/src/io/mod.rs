pub mod parental;
