mod helpers;
mod utils;
