#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use ps_scribe as scribe;
pub use ps_utils as utils;
