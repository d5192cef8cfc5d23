use divan::AllocProfiler;

#[global_allocator]
static ALLOC: AllocProfiler = AllocProfiler::system();

fn main() {
    divan::main();
}

fn get_input() -> Vec<u8> {
    let mut data = Vec::with_capacity(64 * 1024);
    let mut state = 0x1234_5678u32;
    while data.len() < 64 * 1024 {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let run = (state % 24) as usize;
        data.extend(std::iter::repeat((state >> 8) as u8 & 0x1F).take(run + 1));
        data.extend_from_slice(b"root/stage/");
    }
    data
}

pub mod yaz0 {
    use divan::Bencher;

    #[divan::bench(args = [1, 7, 9], sample_count = 10)]
    fn compress(bencher: Bencher, level: u8) {
        bencher
            .with_inputs(super::get_input)
            .bench_refs(|data| divan::black_box(jsys_compression::yaz0::compress(data, level).unwrap()));
    }

    #[divan::bench]
    fn decompress(bencher: Bencher) {
        bencher
            .with_inputs(|| jsys_compression::yaz0::compress(&super::get_input(), 7).unwrap())
            .bench_refs(|data| divan::black_box(jsys_compression::yaz0::decompress(data).unwrap()));
    }
}

pub mod yay0 {
    use divan::Bencher;

    #[divan::bench(sample_count = 10)]
    fn compress(bencher: Bencher) {
        bencher
            .with_inputs(super::get_input)
            .bench_refs(|data| divan::black_box(jsys_compression::yay0::compress(data).unwrap()));
    }

    #[divan::bench]
    fn decompress(bencher: Bencher) {
        bencher
            .with_inputs(|| jsys_compression::yay0::compress(&super::get_input()).unwrap())
            .bench_refs(|data| divan::black_box(jsys_compression::yay0::decompress(data).unwrap()));
    }
}
