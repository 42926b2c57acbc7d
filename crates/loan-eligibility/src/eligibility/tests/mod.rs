mod common;
mod recency;
