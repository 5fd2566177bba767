pub mod logbook;
