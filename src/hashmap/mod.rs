mod repository;

pub use repository::HashMapRepository;
