mod client;

pub use client::ClassevivaClient;
