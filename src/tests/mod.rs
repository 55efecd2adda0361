pub mod test_trainer;
