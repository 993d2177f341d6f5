mod factory;
mod in_memory;
mod pinecone;

pub use factory::create_vector_index;
pub use in_memory::InMemoryVectorIndex;
pub use pinecone::{PineconeIndex, DEFAULT_PINECONE_CONTROL_PLANE_URL};
