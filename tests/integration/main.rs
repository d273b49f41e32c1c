//! Integration tests against real HTTP upstreams on loopback.

mod mock_upstream;
mod pipeline;
