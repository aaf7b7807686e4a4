pub mod common;

mod proxy_round_trip;
