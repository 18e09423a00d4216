mod common;
mod status;
