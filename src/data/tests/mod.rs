mod preset;
mod synthetic;
