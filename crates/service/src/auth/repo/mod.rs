pub mod seaorm;

pub use seaorm::SeaOrmUserStore;
