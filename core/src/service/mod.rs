pub mod club_service;
pub mod dto;
pub mod ledger;
pub mod match_sync;
pub mod stats_service;
