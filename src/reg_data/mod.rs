pub mod qmc5883l;
