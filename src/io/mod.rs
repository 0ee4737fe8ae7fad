//! I/O modules for reading SAR products

pub mod product_reader;

pub use product_reader::{
    read_product, read_product_with_layout, ByteOrder, LineCount, PalsarReader, ProductHeader,
    ProductLayout, PALSAR_L11_LINE_COUNT,
};
