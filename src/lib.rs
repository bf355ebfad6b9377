pub mod engine;
pub mod models;
pub mod sim;

#[cfg(test)]
mod test;
