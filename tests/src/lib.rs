#![cfg(test)]

mod enumeration;
mod infrastructure;
mod interrupt;
mod offline;
mod support;
