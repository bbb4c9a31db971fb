pub mod utxorpc {
    pub mod v1alpha {
        pub mod cardano {
            tonic::include_proto!("utxorpc.v1alpha.cardano");
        }
        pub mod sync {
            tonic::include_proto!("utxorpc.v1alpha.sync");
        }
        pub mod query {
            tonic::include_proto!("utxorpc.v1alpha.query");
        }
        pub mod submit {
            tonic::include_proto!("utxorpc.v1alpha.submit");
        }
        pub mod watch {
            tonic::include_proto!("utxorpc.v1alpha.watch");
        }
    }
}

pub use utxorpc::v1alpha::{cardano, query, submit, sync, watch};
