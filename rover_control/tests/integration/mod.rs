mod capture;
mod shutdown;
mod support;
mod teleop;
