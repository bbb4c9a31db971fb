use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::var_os("PROTOC").is_none() {
        std::env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);
    }

    let protos: Vec<PathBuf> = ["cardano", "sync", "query", "submit", "watch"]
        .iter()
        .map(|name| PathBuf::from(format!("../proto/utxorpc/v1alpha/{name}/{name}.proto")))
        .collect();
    // `google/protobuf/*.proto`; the generated code maps them to `prost-types`.
    let includes = [PathBuf::from("../proto"), protoc_bin_vendored::include_path()?];

    tonic_build::configure()
        .build_server(true)
        .compile(&protos, &includes)?;
    println!("cargo:rerun-if-changed=../proto");
    Ok(())
}
