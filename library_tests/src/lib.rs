//! End-to-end checks running the desk against catalog files on disk.

#[cfg(test)]
mod load_test;
