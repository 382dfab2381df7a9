#[cfg(test)]
mod finder_tests;
