pub mod address;
pub mod info;
pub mod keygen;
pub mod note;
pub mod scan;
pub mod withdraw;
