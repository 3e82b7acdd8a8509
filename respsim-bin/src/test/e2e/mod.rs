mod runtime;
mod test_sim;
