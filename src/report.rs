use vectorizer::VectorizerError;

pub fn report_error(err: &VectorizerError) {
    match err {
        VectorizerError::Decode(_) => {
            eprintln!("{err}");
            eprintln!();
            eprintln!("The input could not be decoded as a raster image.");
            eprintln!("Supported formats include PNG, JPEG, GIF, BMP, TIFF and WebP.");
        }
        _ => {
            eprintln!("{err}");
        }
    }
}
