#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;
extern crate core;
#[cfg(feature = "serde")]
extern crate serde;

pub mod checksum;
pub mod constants;
pub mod datagram;
pub mod db;
pub mod error;
pub mod framer;
pub mod nmea;
pub mod rtcm;
pub mod ubx;

pub use crate::{
    datagram::{Datagram, ReceiveOutcome, Receiver, Sender},
    db::{Database, System},
    error::{CoreError, CoreResult, Outcome},
    framer::{FrameRef, MultiFramer},
};
