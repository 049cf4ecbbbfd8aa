//! Integration tests: full sessions driven through a scripted feed.

mod scripted_feed;
mod simulation;
