/*
    This module converts simplified grammars to Chomsky and Greibach normal form
*/

pub mod cnf;
pub mod gnf;

pub use cnf::to_cnf;
pub use gnf::to_gnf_with_snapshots;
