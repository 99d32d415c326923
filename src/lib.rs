#![no_std]

pub mod reg_data;

pub mod qmc5883l;
