//! CLI tool to discover, control and emulate DreamScreen devices.
use std::io::{ self, Write };
use std::net::SocketAddr;

use clap::Parser;

use dreamscreen::{ Codec, Rgb, TransportConfig };
use dreamscreen_cli::App;

#[derive( Parser )]
#[command( name = "dreamscreen", about = "Discover, control and emulate DreamScreen devices." )]
struct Args {
  /// Local address to listen on.
  #[arg( long, default_value = "0.0.0.0:8888" )]
  bind: SocketAddr,

  /// Where discovery queries and emulator updates are broadcast.
  #[arg( long, default_value = "255.255.255.255:8888" )]
  broadcast: SocketAddr,

  /// Accept messages with an invalid checksum.
  #[arg( long )]
  lenient: bool
}

// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - Main

#[tokio::main( flavor="current_thread" )]
async fn main() {
  env_logger::init();

  let args = Args::parse();
  let codec = if args.lenient { Codec::default().lenient() } else { Codec::default() };
  let transport = TransportConfig::new()
    .bind_address( args.bind )
    .broadcast_address( args.broadcast )
    .codec( codec )
    .build();

  let mut app = App::new( transport );
  let mut input = String::new();

  let index_arg = || clap::Arg::new( "index" ).required( true ).value_parser( clap::value_parser!( usize ) );

  // Define the REPL interface using CLAP
  let mut cli = clap::Command::new( "DreamScreen" )
    .about( "Discover, control and emulate DreamScreen devices." )
    .disable_help_subcommand( true )
    .multicall( true )
    .subcommand_required( true )
    .subcommands([
      clap::Command::new( "list" )
        .about( "Discovers and lists DreamScreen devices." )
        .visible_alias( "ls" ),
      clap::Command::new( "info" )
        .about( "Prints the state of a discovered device at `index`." )
        .arg( index_arg() ),
      clap::Command::new( "mode" )
        .about( "Sets the mode of the device at `index`." )
        .arg( index_arg() )
        .arg( clap::Arg::new( "mode" ).required( true ).value_parser( [ "sleep", "video", "music", "ambient" ] ) ),
      clap::Command::new( "brightness" )
        .about( "Sets the brightness (0-100) of the device at `index`." )
        .arg( index_arg() )
        .arg( clap::Arg::new( "brightness" ).required( true ).value_parser( clap::value_parser!( u8 ) ) ),
      clap::Command::new( "color" )
        .about( "Sets the ambient color of the device at `index`." )
        .arg( index_arg() )
        .arg( clap::Arg::new( "r" ).required( true ).value_parser( clap::value_parser!( u8 ) ) )
        .arg( clap::Arg::new( "g" ).required( true ).value_parser( clap::value_parser!( u8 ) ) )
        .arg( clap::Arg::new( "b" ).required( true ).value_parser( clap::value_parser!( u8 ) ) ),
      clap::Command::new( "scene" )
        .about( "Sets the ambient scene of the device at `index`." )
        .arg( index_arg() )
        .arg( clap::Arg::new( "scene" ).required( true ) ),
      clap::Command::new( "name" )
        .about( "Renames the device at `index`." )
        .arg( index_arg() )
        .arg( clap::Arg::new( "name" ).required( true ) ),
      clap::Command::new( "connect" )
        .about( "Connects directly to the device at `address` and adds it to the list." )
        .arg( clap::Arg::new( "address" ).required( true ) ),
      clap::Command::new( "hdmi-input" )
        .about( "Selects the HDMI input (1-3) of the HD or 4K at `index`." )
        .arg( index_arg() )
        .arg( clap::Arg::new( "input" ).required( true ).value_parser( clap::value_parser!( u8 ).range( 1..=3 ) ) ),
      clap::Command::new( "hdmi-name" )
        .about( "Renames an HDMI input (1-3) of the HD or 4K at `index`." )
        .arg( index_arg() )
        .arg( clap::Arg::new( "input" ).required( true ).value_parser( clap::value_parser!( usize ) ) )
        .arg( clap::Arg::new( "name" ).required( true ) ),
      clap::Command::new( "monitor" )
        .about( "Prints every frame on the network. Run again to stop." )
        .arg( clap::Arg::new( "hex" ).long( "hex" ).action( clap::ArgAction::SetTrue ).help( "Also print the raw frame" ) ),
      clap::Command::new( "emulate" )
        .about( "Runs an emulated device in the background." )
        .arg( clap::Arg::new( "kind" ).required( true ).value_parser( [ "hd", "4k", "sidekick" ] ) )
        .arg( clap::Arg::new( "name" ) ),
      clap::Command::new( "stop" )
        .about( "Stops the emulated device." ),
      clap::Command::new( "replicate" )
        .about( "Copies the settings of the device at `address` into the emulator." )
        .arg( clap::Arg::new( "address" ).required( true ) ),
      clap::Command::new( "exit" ),
      clap::Command::new( "help" ),
    ]);

  // Start the REPL
  loop {
    print!( "{}", app.prompt() );

    input.clear();
    let _ = io::stdout().flush();
    match io::stdin().read_line( &mut input ) {
      Ok( 0 ) | Err( _ ) => break,
      Ok( _ ) => {}
    }

    let Some( args ) = shlex::split( input.trim() ) else { continue };
    if args.is_empty() {
      continue;
    }

    match cli.try_get_matches_from_mut( args ) {
      Ok( matches ) =>
        match matches.subcommand() {
          Some(( "list", _ )) => app.do_list_devices().await,
          Some(( "info", args )) => app.do_print_device_info( index( args ) ),
          Some(( "mode", args )) => app.do_set_mode( index( args ), text( args, "mode" ) ).await,
          Some(( "brightness", args )) => app.do_set_brightness( index( args ), octet( args, "brightness" ) ).await,
          Some(( "color", args )) => {
            let color = Rgb::new( octet( args, "r" ), octet( args, "g" ), octet( args, "b" ) );
            app.do_set_color( index( args ), color ).await
          },
          Some(( "scene", args )) => app.do_set_scene( index( args ), text( args, "scene" ) ).await,
          Some(( "name", args )) => app.do_set_name( index( args ), text( args, "name" ) ).await,
          Some(( "connect", args )) => app.do_connect( text( args, "address" ) ).await,
          Some(( "hdmi-input", args )) => app.do_set_hdmi_input( index( args ), octet( args, "input" ) ).await,
          Some(( "hdmi-name", args )) => {
            let input = args.get_one::<usize>( "input" ).copied().unwrap_or_default();
            app.do_set_hdmi_name( index( args ), input, text( args, "name" ) ).await
          },
          Some(( "monitor", args )) => app.do_monitor( args.get_flag( "hex" ) ),
          Some(( "emulate", args )) => app.do_emulate( text( args, "kind" ), args.get_one::<String>( "name" ).map( String::as_str ) ),
          Some(( "stop", _ )) => app.do_stop_emulator(),
          Some(( "replicate", args )) => app.do_replicate( text( args, "address" ) ).await,
          Some(( "exit", _ )) => break,
          Some(( "help", _ )) => { let _ = cli.print_help(); },
          _ => { /* unrecognized subcommand, no-op */ }
        },
      Err( err ) => println!( "{}", err )
    }
  }

  app.do_stop_emulator();
}

// Required arguments are enforced by clap before these are reached.
fn index( args: &clap::ArgMatches ) -> usize {
  return args.get_one::<usize>( "index" ).copied().unwrap_or_default();
}

fn octet( args: &clap::ArgMatches, id: &str ) -> u8 {
  return args.get_one::<u8>( id ).copied().unwrap_or_default();
}

fn text<'a>( args: &'a clap::ArgMatches, id: &str ) -> &'a str {
  return args.get_one::<String>( id ).map( String::as_str ).unwrap_or_default();
}
