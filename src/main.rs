fn main() {
    if let Err(err) = devportal_mtls_lib::run() {
        eprintln!("devportal-mtls: {err:#}");
        std::process::exit(1);
    }
}
