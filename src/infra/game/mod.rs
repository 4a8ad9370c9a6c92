pub mod town_square_store;

pub use town_square_store::JsonTownSquareStore;
