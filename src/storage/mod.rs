pub mod id_allocator;
