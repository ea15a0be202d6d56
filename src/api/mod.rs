pub mod handover;
