mod dump;
mod identification;
mod interactive;
mod mta;
mod round_engine;
mod signing;
mod zkp;
