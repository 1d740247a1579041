use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use memory_mountain::{
    AccessKernel, Clock, DataBuffer, DiskKernel, FileLineReader, KBestFitter, MemoryKernel,
    ThroughputMeasurer, TscClock,
};

fn write_input_file(path: &Path, num_lines: usize) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    for i in 0..num_lines {
        writeln!(file, "{}", i)?;
    }
    Ok(())
}

fn bench<K: AccessKernel>(name: &str, kernel: K, mhz: f64, size_bytes: usize, stride: usize) -> f64 {
    let mut measurer = ThroughputMeasurer::new(kernel, KBestFitter::default(), mhz);
    let bandwidth = measurer.measure(size_bytes, stride).unwrap();
    println!("{:30} {:>8} B  s{:<3} {:>12.1} MB/s", name, size_bytes, stride, bandwidth);
    bandwidth
}

fn main() {
    println!("=== Memory-Resident vs Mapped-File Access ===\n");

    let mhz = TscClock::with_sleep(std::time::Duration::from_millis(500))
        .estimate_frequency_mhz()
        .unwrap();
    println!("Clock: {:.1} MHz\n", mhz);

    let test_file = std::env::temp_dir().join("mountain_bench_input.txt");

    // Disk lookups rescan the file per element, so keep working sets small.
    let test_cases = vec![
        ("Tiny (64 elems)", 64 * 8, 64),
        ("Small (256 elems)", 256 * 8, 256),
        ("Medium (1K elems)", 1024 * 8, 1024),
    ];

    for (desc, size_bytes, num_lines) in test_cases {
        println!("--- {} ---", desc);
        write_input_file(&test_file, num_lines).unwrap();
        let file_size = fs::metadata(&test_file).unwrap().len();
        println!("  File size: {:.2} KB", file_size as f64 / 1_000.0);

        let mut buffer = DataBuffer::for_bytes(size_bytes);
        buffer.init_all();

        for stride in [1, 8] {
            let mem = bench("In-Memory", MemoryKernel::new(&buffer), mhz, size_bytes, stride);
            let disk = bench(
                "Mapped file (line lookup)",
                DiskKernel::new(FileLineReader::new(&test_file)),
                mhz,
                size_bytes,
                stride,
            );
            println!("  → In-Memory is {:.0}x faster at stride {}", mem / disk, stride);
        }
        println!();

        let _ = fs::remove_file(&test_file);
    }

    println!("=== Strided walk over a 4 MB working set ===\n");
    let size_bytes = 4 << 20;
    let mut buffer = DataBuffer::for_bytes(size_bytes);
    buffer.init_all();
    for stride in [1, 2, 4, 8, 16, 32, 64] {
        bench("In-Memory", MemoryKernel::new(&buffer), mhz, size_bytes, stride);
    }
}
