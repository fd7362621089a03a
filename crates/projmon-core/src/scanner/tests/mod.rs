mod tests_hash;
mod tests_walker;
