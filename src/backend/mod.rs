pub mod backend;
pub mod format;

#[cfg(test)]
mod tests;
