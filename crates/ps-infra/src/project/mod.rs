mod in_memory_project_store;

pub use in_memory_project_store::InMemoryProjectStore;
