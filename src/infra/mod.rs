pub mod classeviva;
