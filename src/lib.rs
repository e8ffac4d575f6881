pub mod config;
pub mod error;
pub mod fetch;
pub mod output;
pub mod parser;
pub mod poller;
pub mod realtime;
pub mod relay;
pub mod schedule;
pub mod status;

pub mod gtfs_rt {
    include!(concat!(env!("OUT_DIR"), "/transit_realtime.rs"));
}
